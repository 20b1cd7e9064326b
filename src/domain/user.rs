use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Borrower, UserId};

/// 利用者の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 司書（カタログ・貸出の管理）
    Admin,
    /// 学生
    Student,
    /// 教職員
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// セッションの利用者（パスワードは保持しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// 登録日（利用者一覧に表示）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
}

impl User {
    /// 貸出記録に写す借り手情報
    pub fn as_borrower(&self) -> Borrower {
        Borrower {
            user_id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// 名前・メール・役割・所属の部分一致（大文字小文字を区別しない）
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.email.to_lowercase().contains(&q)
            || self.role.as_str().contains(&q)
            || self
                .department
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&q))
    }
}
