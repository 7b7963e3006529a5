use anyhow::{anyhow, Result};
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::GlobalConfig;

/// 配置加载器
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// 加载全局配置
    pub fn load_global(&self) -> Result<GlobalConfig> {
        let config_path = self.config_dir.join("global.toml");

        if !config_path.exists() {
            // 如果配置文件不存在，返回默认配置
            return Ok(GlobalConfig::default());
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 把默认配置写入 `global.toml`，已存在时不覆盖
    pub fn write_default(&self) -> Result<PathBuf> {
        let config_path = self.config_dir.join("global.toml");

        if !config_path.exists() {
            let content = toml::to_string_pretty(&GlobalConfig::default())?;
            std::fs::create_dir_all(&self.config_dir)?;
            std::fs::write(&config_path, content)?;
        }

        Ok(config_path)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        let global = self.load_global()?;
        validate_global(&global)
    }
}

/// 验证已加载的全局配置
pub fn validate_global(global: &GlobalConfig) -> Result<()> {
    let history = &global.history;

    if history.minimum_processing_interval_ms < 0 {
        return Err(anyhow!(
            "minimum_processing_interval_ms ({}) cannot be negative",
            history.minimum_processing_interval_ms
        ));
    }

    if history.max_slices_per_read == 0 {
        return Err(anyhow!("max_slices_per_read must be greater than 0"));
    }

    check_percent("history.aggregate.percent_data_bad", history.aggregate.percent_data_bad)?;
    check_percent("history.aggregate.percent_data_good", history.aggregate.percent_data_good)?;

    for (node_id, node) in &global.nodes {
        if let Some(value) = node.percent_data_bad {
            check_percent(&format!("nodes.{}.percent_data_bad", node_id), value)?;
        }
        if let Some(value) = node.percent_data_good {
            check_percent(&format!("nodes.{}.percent_data_good", node_id), value)?;
        }
    }

    Ok(())
}

fn check_percent(name: &str, value: u8) -> Result<()> {
    if value > 100 {
        return Err(anyhow!("{} ({}) must be within 0..=100", name, value));
    }
    Ok(())
}
