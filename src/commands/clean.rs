use crate::{
    CleanArgs,
    build::{base_path_from_config, resolve_path},
    config::BlogConfig,
};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config_path = super::config_path(args.config_file.as_deref())?;
    let config = BlogConfig::load_from_arg(Some(config_path.as_path())).await?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    // Delete the generated site folder
    let site_path = resolve_path(&config.site.output, &base_path);
    if site_path.exists() {
        if args.dry_run {
            println!("Would delete {}", site_path.display());
        } else {
            tokio::fs::remove_dir_all(&site_path).await?;
            println!("Deleted {}", site_path.display());
        }
    } else {
        println!("Nothing to clean at {}", site_path.display());
    }

    Ok(())
}
