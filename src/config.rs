use std::path::PathBuf;
use thiserror::Error;

/// スナップショットの保存先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// データディレクトリ内のJSONファイル
    File { data_dir: PathBuf },
    /// PostgreSQLの`snapshots`テーブル
    Postgres { database_url: String },
    /// プロセス内のみ（再起動で消える）
    Memory,
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// アプリケーション設定
///
/// 環境変数から1度だけ読み込む。
/// - `PORT` (既定: 3000)
/// - `LIBRARY_STORAGE` = `file` | `postgres` | `memory` (既定: file)
/// - `LIBRARY_DATA_DIR` (既定: ./data)
/// - `DATABASE_URL` (既定: postgres://localhost/library)
/// - `LIBRARY_SEED_SAMPLE` = `true` | `false` (既定: true)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    pub seed_sample_catalog: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から読み込む（テスト用に環境変数を差し替えられる）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value })?,
            None => 3000,
        };

        let storage = match lookup("LIBRARY_STORAGE").as_deref() {
            None | Some("file") => StorageBackend::File {
                data_dir: lookup("LIBRARY_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data")),
            },
            Some("postgres") => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgres://localhost/library".into()),
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LIBRARY_STORAGE",
                    value: other.to_string(),
                });
            }
        };

        let seed_sample_catalog = match lookup("LIBRARY_SEED_SAMPLE").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LIBRARY_SEED_SAMPLE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            port,
            storage,
            seed_sample_catalog,
        })
    }
}
