use crate::{
    InitArgs,
    config::{BlogConfig, DEFAULT_CONFIG_FILE},
};

const SAMPLE_CONFIG: &str = "\
site:
  name: My Blog
  url: https://my-blog.example.com
  author: Your Name

content:
  path: posts
";

const SAMPLE_POST: &str = "\
---
title: Hello World
description: The first post on this blog.
date: 2024-01-01
tags: [intro]
---

Welcome to **{title}**.

## Getting started

<Callout type=\"note\">
Posts live in `posts/` as `.mdx` or `.md` files.
</Callout>

```rust:main.rs {2}
fn main() {
    println!(\"hello\");
}
```
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    // The sample must parse with the current schema
    let config = BlogConfig::from_yaml(SAMPLE_CONFIG)?;

    println!("Initializing project in {}", path.display());

    tokio::fs::write(&config_file, SAMPLE_CONFIG).await?;
    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    let posts_dir = path.join(&config.content.path);
    tokio::fs::create_dir_all(&posts_dir).await?;
    let sample_post = posts_dir.join("hello-world.mdx");
    if !sample_post.exists() {
        tokio::fs::write(&sample_post, SAMPLE_POST).await?;
        println!("Created sample post {}", sample_post.display());
    }

    Ok(())
}
