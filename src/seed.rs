//! Sample accounts for local development and the table printer used by the
//! `seeder` binary.

use std::fmt::Write as _;

use tracing::info;

use crate::auth::password::hash_password_blocking;
use crate::store::{NewUser, Role, User, UserStore};

pub struct SampleUser {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: Role,
}

pub const SAMPLE_USERS: [SampleUser; 5] = [
    SampleUser {
        name: "Admin User",
        email: "admin@example.com",
        password: "admin123",
        role: Role::Admin,
    },
    SampleUser {
        name: "John Doe",
        email: "john@example.com",
        password: "password123",
        role: Role::User,
    },
    SampleUser {
        name: "Jane Smith",
        email: "jane@example.com",
        password: "password123",
        role: Role::User,
    },
    SampleUser {
        name: "Mike Johnson",
        email: "mike@example.com",
        password: "password123",
        role: Role::User,
    },
    SampleUser {
        name: "Sarah Wilson",
        email: "sarah@example.com",
        password: "password123",
        role: Role::Moderator,
    },
];

#[derive(Debug)]
pub enum SeedOutcome {
    Seeded(Vec<User>),
    /// Users were present and `clear` was not requested; nothing changed.
    AlreadyPopulated(usize),
}

pub async fn seed_users(store: &dyn UserStore, clear: bool) -> anyhow::Result<SeedOutcome> {
    if clear {
        let removed = clear_users(store).await?;
        info!(removed, "cleared existing users");
    } else {
        let existing = store.list().await?.len();
        if existing > 0 {
            return Ok(SeedOutcome::AlreadyPopulated(existing));
        }
    }

    let mut created = Vec::with_capacity(SAMPLE_USERS.len());
    for sample in &SAMPLE_USERS {
        let password_hash = hash_password_blocking(sample.password.to_string()).await?;
        let user = store
            .insert(NewUser {
                name: sample.name.to_string(),
                email: sample.email.to_string(),
                password_hash,
                role: sample.role,
            })
            .await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "seeded user");
        created.push(user);
    }
    Ok(SeedOutcome::Seeded(created))
}

pub async fn clear_users(store: &dyn UserStore) -> anyhow::Result<u64> {
    Ok(store.delete_all().await?)
}

/// Plain-text table of name, email, role and creation date.
pub fn render_table(users: &[User]) -> String {
    let headers = ["Name", "Email", "Role", "Created At"];
    let rows: Vec<[String; 4]> = users
        .iter()
        .map(|u| {
            [
                u.name.clone(),
                u.email.clone(),
                u.role.to_string(),
                u.created_at.date().to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut out = String::new();
    let _ = writeln!(out, "{}", table_row(&headers, &widths));
    let _ = writeln!(out, "|{rule}|");
    for row in &rows {
        let cells = row.each_ref().map(String::as_str);
        let _ = writeln!(out, "{}", table_row(&cells, &widths));
    }
    out
}

fn table_row(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(c, w)| format!(" {c:<w$} "))
        .collect();
    format!("|{}|", padded.join("|"))
}
