use crate::{
    BuildArgs,
    build::{PageGenerator, base_path_from_config},
    config::BlogConfig,
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = super::config_path(args.config_file.as_deref())?;
    let config = BlogConfig::load_from_arg(Some(config_path.as_path())).await?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    let generator = PageGenerator::new(config, base_path);
    let result = generator.generate().await?;

    println!(
        "Built {} post(s) to {}",
        result.pages,
        result.output_dir.display()
    );
    if !result.skipped.is_empty() {
        println!(
            "Skipped {} post(s) with errors: {}",
            result.skipped.len(),
            result.skipped.join(", ")
        );
    }

    Ok(())
}
