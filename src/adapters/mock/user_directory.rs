use crate::domain::{Role, User, UserId};
use crate::ports::user_directory::{Result, UserDirectory as UserDirectoryTrait};
use async_trait::async_trait;

/// Mock implementation of UserDirectory
///
/// Fixed demo table compared in plaintext. Not an authentication system.
/// Entries without a password are listed but cannot log in.
pub struct UserDirectory {
    entries: Vec<(User, Option<&'static str>)>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            entries: demo_users(),
        }
    }

    /// Add a user for testing purposes
    pub fn with_user(mut self, user: User, password: Option<&'static str>) -> Self {
        self.entries.push((user, password));
        self
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectoryTrait for UserDirectory {
    /// Match email and password against the demo table
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .entries
            .iter()
            .find(|(user, pw)| user.email == email && *pw == Some(password))
            .map(|(user, _)| user.clone()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.entries.iter().map(|(user, _)| user.clone()).collect())
    }
}

fn demo_user(
    id: &str,
    email: &str,
    name: &str,
    role: Role,
    student_id: Option<&str>,
    department: Option<&str>,
    joined: &str,
) -> User {
    User {
        id: UserId::from_string(id),
        email: email.to_string(),
        name: name.to_string(),
        role,
        student_id: student_id.map(str::to_string),
        department: department.map(str::to_string),
        join_date: joined.parse().ok(),
    }
}

fn demo_users() -> Vec<(User, Option<&'static str>)> {
    vec![
        (
            demo_user(
                "1",
                "admin@smartreads.com",
                "Admin User",
                Role::Admin,
                None,
                None,
                "2024-01-15",
            ),
            Some("admin123"),
        ),
        (
            demo_user(
                "2",
                "student@smartreads.com",
                "John Doe",
                Role::Student,
                Some("ST001"),
                Some("Computer Science"),
                "2024-02-20",
            ),
            Some("student123"),
        ),
        (
            demo_user(
                "3",
                "staff@smartreads.com",
                "Jane Smith",
                Role::Staff,
                None,
                Some("Mathematics"),
                "2024-01-30",
            ),
            Some("staff123"),
        ),
        (
            demo_user(
                "4",
                "alice@smartreads.com",
                "Alice Johnson",
                Role::Student,
                Some("ST002"),
                Some("Physics"),
                "2024-03-10",
            ),
            None,
        ),
        (
            demo_user(
                "5",
                "bob@smartreads.com",
                "Bob Wilson",
                Role::Staff,
                None,
                Some("English Literature"),
                "2024-02-05",
            ),
            None,
        ),
    ]
}
