//! # Procedure Registry
//!
//! Every tRPC procedure the server exposes, by dotted path:
//!
//! | Path                          | Kind     | Module            |
//! |-------------------------------|----------|-------------------|
//! | `health`                      | query    | [`system`]        |
//! | `echo`                        | query    | [`system`]        |
//! | `integrations.validateTaxId`  | mutation | [`integrations`]  |

pub mod integrations;
pub mod system;

use crate::rpc::{Procedure, ProcedureKind};

/// All registered procedures.
pub static PROCEDURES: &[Procedure] = &[
    Procedure {
        path: "health",
        kind: ProcedureKind::Query,
        handler: system::health,
    },
    Procedure {
        path: "echo",
        kind: ProcedureKind::Query,
        handler: system::echo,
    },
    Procedure {
        path: "integrations.validateTaxId",
        kind: ProcedureKind::Mutation,
        handler: integrations::validate_tax_id,
    },
];

/// Look up a procedure by its dotted path.
pub fn find(path: &str) -> Option<&'static Procedure> {
    PROCEDURES.iter().find(|p| p.path == path)
}
