mod ask;
mod import;
mod records;
mod stats;
mod users;

pub use ask::cmd_ask;
pub use import::cmd_import;
pub use records::{cmd_list_datasets, cmd_list_incidents, cmd_list_tickets};
pub use stats::cmd_stats;
pub use users::{cmd_passwd, cmd_register, cmd_role};
