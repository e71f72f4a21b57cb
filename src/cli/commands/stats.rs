use serde_json::json;

use crate::cli::OutputFormat;
use crate::database::{AccountStore, TestimonialStore};

pub async fn handle<S>(store: &S, output_format: OutputFormat) -> anyhow::Result<()>
where
    S: TestimonialStore + AccountStore,
{
    let testimonials = store.count().await?;
    let accounts = store.list().await?;
    let staff = accounts.iter().filter(|a| a.is_elevated()).count();

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "testimonials": testimonials,
                    "accounts": accounts.len(),
                    "staff": staff
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{:<15} {}", "Testimonials:", testimonials);
            println!("{:<15} {}", "Accounts:", accounts.len());
            println!("{:<15} {}", "Staff:", staff);
        }
    }

    Ok(())
}
