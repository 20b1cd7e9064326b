use crate::domain::User;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者ディレクトリポート
///
/// ログイン時の資格情報照合と、利用者一覧の取得を抽象化する。
/// セキュリティ境界ではない（デモ用の固定テーブルを想定）。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// メールアドレスとパスワードを照合する
    ///
    /// 一致しない場合は`None`を返す。返す利用者はパスワードを含まない。
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>>;

    /// 登録済みの利用者をすべて返す
    async fn list(&self) -> Result<Vec<User>>;
}
