//! CLI command implementations.
//!
//! | Module      | Commands handled |
//! |-------------|------------------|
//! | `workflows` | `Workflows`      |
//! | `board`     | `Board`          |
//! | `moves`     | `Move`           |
//! | `config`    | `Config`         |

pub mod board;
pub mod config;
pub mod moves;
pub mod workflows;

pub use board::cmd_board;
pub use config::cmd_config;
pub use moves::cmd_move;
pub use workflows::cmd_workflows;
