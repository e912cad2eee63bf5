use super::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    pub cache: CacheConfig,
    pub validation: ValidationConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// キャッシュに保持する投稿数の上限（LRU）
    pub max_posts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationConfig {
    pub max_comment_chars: usize,
    pub max_caption_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// 確定済みアクションを履歴として残す件数
    pub history_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            validation: ValidationConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_posts: 500 }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_comment_chars: 2200,
            max_caption_chars: 2200,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { history_limit: 64 }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる（テスト用にも使う）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 既定値
        let mut cfg = Self::default();

        if let Some(value) = lookup("SURGE_CACHE_MAX_POSTS").as_deref().and_then(parse_usize) {
            cfg.cache.max_posts = value;
        }
        if let Some(value) = lookup("SURGE_MAX_COMMENT_CHARS")
            .as_deref()
            .and_then(parse_usize)
        {
            cfg.validation.max_comment_chars = value;
        }
        if let Some(value) = lookup("SURGE_MAX_CAPTION_CHARS")
            .as_deref()
            .and_then(parse_usize)
        {
            cfg.validation.max_caption_chars = value;
        }
        if let Some(value) = lookup("SURGE_LEDGER_HISTORY_LIMIT")
            .as_deref()
            .and_then(parse_usize)
        {
            cfg.ledger.history_limit = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.cache.max_posts == 0 {
            return Err(AppError::Configuration(
                "Cache max_posts must be greater than 0".to_string(),
            ));
        }
        if self.validation.max_comment_chars == 0 {
            return Err(AppError::Configuration(
                "Validation max_comment_chars must be greater than 0".to_string(),
            ));
        }
        if self.validation.max_caption_chars == 0 {
            return Err(AppError::Configuration(
                "Validation max_caption_chars must be greater than 0".to_string(),
            ));
        }
        if self.ledger.history_limit == 0 {
            return Err(AppError::Configuration(
                "Ledger history_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
