//! FinSaathi debt payoff planning.
//!
//! [`core`](crate::core) holds the deterministic payoff simulator: given debts, a monthly
//! budget and an avalanche or snowball strategy it produces a month-by-month
//! schedule and compares it against paying minimums only. [`store`] and
//! [`narrative`] are the collaborators around it, and [`api`] / [`cli`]
//! expose everything over HTTP and the command line.

pub mod api;
pub mod cli;
pub mod core;
pub mod narrative;
pub mod store;
