use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{Role, User, UserId};
use crate::ports::{SESSION_KEY, SnapshotStore, UserDirectory};

use super::errors::{Result, SessionError};

/// 利用者登録の入力
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// セッション（現在の利用者の保持）
///
/// 1つのブラウザタブに相当する単一セッション。
/// 利用者はスナップショットとして保存され、ログアウトで削除される。
/// 資格情報の照合はデモ用で、セキュリティ境界ではない。
pub struct Session {
    current: Option<User>,
    store: Arc<dyn SnapshotStore>,
    directory: Arc<dyn UserDirectory>,
}

impl Session {
    pub fn new(store: Arc<dyn SnapshotStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            current: None,
            store,
            directory,
        }
    }

    /// 保存済みのセッションを復元する
    pub async fn restore(
        store: Arc<dyn SnapshotStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self> {
        let current: Option<User> = match store
            .load(SESSION_KEY)
            .await
            .map_err(SessionError::StorageError)?
        {
            Some(value) => {
                Some(serde_json::from_value(value).map_err(SessionError::CorruptSnapshot)?)
            }
            None => None,
        };

        if let Some(user) = &current {
            tracing::info!(user_id = %user.id, role = user.role.as_str(), "Session restored");
        }

        Ok(Self {
            current,
            store,
            directory,
        })
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// ログイン
    ///
    /// # エラー
    /// - InvalidCredentials: 一致する利用者がいない
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let user = self
            .directory
            .authenticate(email, password)
            .await
            .map_err(SessionError::DirectoryError)?
            .ok_or_else(|| {
                tracing::warn!(email, "Login failed");
                SessionError::InvalidCredentials
            })?;

        self.sign_in(user.clone()).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Logged in");
        Ok(user)
    }

    /// 利用者登録（新しいIDを発行してそのままログイン状態にする）
    ///
    /// パスワードは保存しない。
    pub async fn register(&mut self, data: RegisterUser) -> Result<User> {
        let user = User {
            id: UserId::new(),
            email: data.email,
            name: data.name,
            role: data.role,
            student_id: data.student_id,
            department: data.department,
            join_date: Some(Utc::now().date_naive()),
        };

        self.sign_in(user.clone()).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Registered");
        Ok(user)
    }

    /// ログアウト
    pub async fn logout(&mut self) -> Result<()> {
        self.store
            .remove(SESSION_KEY)
            .await
            .map_err(SessionError::StorageError)?;
        if let Some(user) = self.current.take() {
            tracing::info!(user_id = %user.id, "Logged out");
        }
        Ok(())
    }

    /// ログイン中の利用者を要求する
    pub fn require_user(&self) -> Result<&User> {
        self.current.as_ref().ok_or(SessionError::NotSignedIn)
    }

    /// 管理者を要求する
    pub fn require_admin(&self) -> Result<&User> {
        let user = self.require_user()?;
        if !user.role.is_admin() {
            return Err(SessionError::Forbidden(format!(
                "role '{}' cannot manage the library",
                user.role.as_str()
            )));
        }
        Ok(user)
    }

    /// 利用者一覧（名前・メール・役割・所属で検索、空クエリは全件）
    pub async fn list_users(&self, query: &str) -> Result<Vec<User>> {
        let users = self
            .directory
            .list()
            .await
            .map_err(SessionError::DirectoryError)?;
        if query.trim().is_empty() {
            return Ok(users);
        }
        Ok(users
            .into_iter()
            .filter(|u| u.matches_query(query))
            .collect())
    }

    async fn sign_in(&mut self, user: User) -> Result<()> {
        let value =
            serde_json::to_value(&user).map_err(|e| SessionError::StorageError(Box::new(e)))?;
        self.store
            .save(SESSION_KEY, value)
            .await
            .map_err(SessionError::StorageError)?;
        self.current = Some(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::SnapshotStore as MemorySnapshotStore;
    use crate::adapters::mock::UserDirectory as MockUserDirectory;

    fn session_with(store: Arc<MemorySnapshotStore>) -> Session {
        Session::new(store, Arc::new(MockUserDirectory::new()))
    }

    #[tokio::test]
    async fn test_login_with_demo_credentials() {
        let store = Arc::new(MemorySnapshotStore::new());
        let mut session = session_with(store.clone());

        let user = session
            .login("admin@smartreads.com", "admin123")
            .await
            .unwrap();

        assert_eq!(user.role, Role::Admin);
        assert_eq!(session.current(), Some(&user));
        assert!(store.contains(SESSION_KEY));
        assert!(session.require_admin().is_ok());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let mut session = session_with(Arc::new(MemorySnapshotStore::new()));

        let result = session.login("admin@smartreads.com", "wrong").await;

        assert!(matches!(result, Err(SessionError::InvalidCredentials)));
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_student_is_not_admin() {
        let mut session = session_with(Arc::new(MemorySnapshotStore::new()));
        session
            .login("student@smartreads.com", "student123")
            .await
            .unwrap();

        assert!(session.require_user().is_ok());
        assert!(matches!(
            session.require_admin(),
            Err(SessionError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_snapshot() {
        let store = Arc::new(MemorySnapshotStore::new());
        let mut session = session_with(store.clone());
        session
            .login("staff@smartreads.com", "staff123")
            .await
            .unwrap();

        session.logout().await.unwrap();

        assert!(session.current().is_none());
        assert!(!store.contains(SESSION_KEY));
        assert!(matches!(
            session.require_user(),
            Err(SessionError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_register_then_restore() {
        let store = Arc::new(MemorySnapshotStore::new());
        let mut session = session_with(store.clone());
        let user = session
            .register(RegisterUser {
                email: "new@smartreads.com".to_string(),
                password: "secret".to_string(),
                name: "New Student".to_string(),
                role: Role::Student,
                student_id: Some("ST099".to_string()),
                department: None,
            })
            .await
            .unwrap();

        let restored = Session::restore(store, Arc::new(MockUserDirectory::new()))
            .await
            .unwrap();

        assert_eq!(restored.current(), Some(&user));
        assert!(user.join_date.is_some());
    }

    #[tokio::test]
    async fn test_restore_without_snapshot_is_signed_out() {
        let restored = Session::restore(
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(MockUserDirectory::new()),
        )
        .await
        .unwrap();

        assert!(restored.current().is_none());
    }

    #[tokio::test]
    async fn test_restore_rejects_corrupt_snapshot() {
        let store = Arc::new(MemorySnapshotStore::new());
        store
            .save(SESSION_KEY, serde_json::json!({ "id": 1 }))
            .await
            .unwrap();

        let result = Session::restore(store, Arc::new(MockUserDirectory::new())).await;

        assert!(matches!(result, Err(SessionError::CorruptSnapshot(_))));
    }

    #[tokio::test]
    async fn test_list_users_filters() {
        let session = session_with(Arc::new(MemorySnapshotStore::new()));

        assert_eq!(session.list_users("").await.unwrap().len(), 5);
        let physics = session.list_users("physics").await.unwrap();
        assert_eq!(physics.len(), 1);
        assert_eq!(physics[0].name, "Alice Johnson");
    }
}
