//! Scaffolding for `promptlight init`.

use anyhow::Result;
use std::path::{Path, PathBuf};

const CONFIG_TEMPLATE: &str = include_str!("../../config-templates/config.toml");

#[derive(Debug, Clone)]
pub struct InitReport {
    pub config_path: PathBuf,
    pub created: bool,
}

pub async fn initialize_default() -> Result<InitReport> {
    initialize_at_root(&crate::config::default_root()).await
}

pub async fn initialize_at_root(root: &Path) -> Result<InitReport> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| anyhow::anyhow!("create config root {}: {e}", root.display()))?;

    let config_path = root.join("config.toml");
    match tokio::fs::metadata(&config_path).await {
        Ok(_) => Ok(InitReport {
            config_path,
            created: false,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::write(&config_path, CONFIG_TEMPLATE)
                .await
                .map_err(|e| {
                    anyhow::anyhow!("write config template {}: {e}", config_path.display())
                })?;
            Ok(InitReport {
                config_path,
                created: true,
            })
        }
        Err(err) => Err(anyhow::anyhow!(
            "inspect config path {}: {err}",
            config_path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptLightConfig;
    use uuid::Uuid;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("promptlight-init-{name}-{}", Uuid::new_v4()))
    }

    #[test]
    fn template_parses_and_validates() {
        let cfg: PromptLightConfig = toml::from_str(CONFIG_TEMPLATE).expect("parse template");
        cfg.validate().expect("template validates");
        assert_eq!(cfg.server.port, 8001);
    }

    #[tokio::test]
    async fn init_is_idempotent_and_never_overwrites() {
        let root = temp_root("idempotent");
        let first = initialize_at_root(&root).await.expect("first init");
        assert!(first.created);

        tokio::fs::write(&first.config_path, "[server]\nport = 9001\n")
            .await
            .expect("edit config");
        let second = initialize_at_root(&root).await.expect("second init");
        assert!(!second.created);
        let contents = tokio::fs::read_to_string(&second.config_path)
            .await
            .expect("read config");
        assert!(contents.contains("9001"));

        let _ = std::fs::remove_dir_all(root);
    }
}
