//! Authorization policy.
//!
//! A pure predicate over (surface, principal, operation, target). Handlers call
//! [`authorize`] twice for record operations: once before loading the record
//! (authentication and role only) and once with the loaded record (ownership).

use crate::database::models::{Account, Testimonial};
use crate::middleware::Principal;
use crate::types::Operation;

/// The two front-ends that manage testimonials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Self-service: anyone reads, authors manage their own
    Public,
    /// Staff portal: role-based, ownership ignored
    Portal,
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    NotOwner,
    NotStaff,
}

impl Denial {
    pub fn message(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => "You must be logged in to do that.",
            Denial::NotOwner => "You can only change your own testimonials.",
            Denial::NotStaff => "This area is restricted to staff.",
        }
    }
}

pub fn authorize(
    surface: Surface,
    principal: &Principal,
    operation: Operation,
    target: Option<&Testimonial>,
) -> Result<(), Denial> {
    match surface {
        Surface::Public => match operation {
            Operation::List => Ok(()),
            Operation::Create => principal.account().map(|_| ()).ok_or(Denial::Unauthenticated),
            Operation::Update | Operation::Delete => {
                let account = principal.account().ok_or(Denial::Unauthenticated)?;
                match target {
                    Some(t) if !t.is_authored_by(account.id) => Err(Denial::NotOwner),
                    _ => Ok(()),
                }
            }
            Operation::Dashboard => Err(Denial::NotStaff),
        },
        Surface::Portal => {
            let account = principal.account().ok_or(Denial::Unauthenticated)?;
            if account.is_elevated() {
                Ok(())
            } else {
                Err(Denial::NotStaff)
            }
        }
    }
}

/// Portal login gate, applied after the password has been checked
pub fn may_enter_portal(account: &Account) -> bool {
    account.is_active && account.is_elevated()
}
