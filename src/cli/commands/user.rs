use clap::Subcommand;
use serde_json::json;

use crate::auth;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::NewAccount;
use crate::database::{AccountStore, DatabaseError, TestimonialStore};
use crate::forms::{validate_first_name, validate_password, validate_username};
use crate::types::ListOrder;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List all accounts")]
    List,

    #[command(about = "Create an account")]
    Create {
        #[arg(help = "Username")]
        username: String,

        #[arg(long, help = "Password (at least 8 characters)")]
        password: String,

        #[arg(long, default_value = "", help = "First name shown on testimonials")]
        first_name: String,

        #[arg(long, help = "Grant access to the staff portal")]
        staff: bool,

        #[arg(long, help = "Grant superuser rights (implies portal access)")]
        superuser: bool,
    },

    #[command(about = "Delete an account and every testimonial it wrote")]
    Delete {
        #[arg(help = "Username")]
        username: String,
    },
}

pub async fn handle<S>(cmd: UserCommands, store: &S, output_format: OutputFormat) -> anyhow::Result<()>
where
    S: TestimonialStore + AccountStore,
{
    match cmd {
        UserCommands::List => {
            let accounts = store.list().await?;

            if accounts.is_empty() {
                return output_empty_collection(&output_format, "users", "No accounts found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": accounts }))?);
                }
                OutputFormat::Text => {
                    println!("{:<25} {:<20} {:<6} {:<6} {:<7} {}", "USERNAME", "FIRST NAME", "STAFF", "SUPER", "ACTIVE", "CREATED");
                    println!("{}", "-".repeat(90));

                    for account in &accounts {
                        println!(
                            "{:<25} {:<20} {:<6} {:<6} {:<7} {}",
                            account.username,
                            account.first_name,
                            yes_no(account.is_staff),
                            yes_no(account.is_superuser),
                            yes_no(account.is_active),
                            account.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }

            Ok(())
        }
        UserCommands::Create {
            username,
            password,
            first_name,
            staff,
            superuser,
        } => {
            validate_username(&username).map_err(|e| anyhow::anyhow!("Invalid username: {}", e))?;
            validate_password(&password).map_err(|e| anyhow::anyhow!("Invalid password: {}", e))?;
            let first_name = first_name.trim().to_string();
            validate_first_name(&first_name).map_err(|e| anyhow::anyhow!("Invalid first name: {}", e))?;

            let password_hash = auth::hash_password(&password)?;
            let new = NewAccount {
                first_name,
                is_staff: staff,
                is_superuser: superuser,
                ..NewAccount::regular(username.clone(), password_hash)
            };

            let account = match store.create(new).await {
                Ok(account) => account,
                Err(DatabaseError::Conflict(_)) => {
                    return Err(anyhow::anyhow!("User '{}' already exists", username));
                }
                Err(e) => return Err(e.into()),
            };

            output_success(
                &output_format,
                &format!("User '{}' created", account.username),
                Some(json!({ "user": account })),
            )
        }
        UserCommands::Delete { username } => {
            let Some(account) = store.find_by_username(&username).await? else {
                return Err(anyhow::anyhow!("User '{}' not found", username));
            };

            let authored = store
                .all(ListOrder::Created)
                .await?
                .iter()
                .filter(|t| t.is_authored_by(account.id))
                .count();

            AccountStore::delete(store, account.id).await?;

            output_success(
                &output_format,
                &format!("User '{}' deleted along with {} testimonial(s)", username, authored),
                Some(json!({ "deleted_testimonials": authored })),
            )
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewTestimonial;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn create_then_delete_cascades() {
        let store = MemoryStore::new();

        handle(
            UserCommands::Create {
                username: "rosa".to_string(),
                password: "sweetpeas".to_string(),
                first_name: "Rosa".to_string(),
                staff: true,
                superuser: false,
            },
            &store,
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let rosa = store.find_by_username("rosa").await.unwrap().unwrap();
        assert!(rosa.is_staff);
        assert!(!rosa.is_superuser);
        assert!(auth::verify_password(&rosa.password_hash, "sweetpeas"));

        store
            .insert(NewTestimonial {
                author_id: rosa.id,
                location: None,
                body: "Lovely".to_string(),
            })
            .await
            .unwrap();

        handle(UserCommands::Delete { username: "rosa".to_string() }, &store, OutputFormat::Json)
            .await
            .unwrap();

        assert!(store.find_by_username("rosa").await.unwrap().is_none());
        assert_eq!(TestimonialStore::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_and_invalid_users_are_rejected() {
        let store = MemoryStore::new();
        let create = |username: &str, password: &str| UserCommands::Create {
            username: username.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            staff: false,
            superuser: false,
        };

        handle(create("rosa", "sweetpeas"), &store, OutputFormat::Json).await.unwrap();
        assert!(handle(create("rosa", "sweetpeas"), &store, OutputFormat::Json).await.is_err());
        assert!(handle(create("x", "sweetpeas"), &store, OutputFormat::Json).await.is_err());
        assert!(handle(create("lily", "short"), &store, OutputFormat::Json).await.is_err());

        let long_name = UserCommands::Create {
            username: "iris".to_string(),
            password: "sweetpeas".to_string(),
            first_name: "i".repeat(151),
            staff: false,
            superuser: false,
        };
        assert!(handle(long_name, &store, OutputFormat::Json).await.is_err());
        assert!(store.find_by_username("iris").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_unknown_user_fails() {
        let store = MemoryStore::new();
        let result = handle(UserCommands::Delete { username: "ghost".to_string() }, &store, OutputFormat::Text).await;
        assert!(result.is_err());
    }
}
