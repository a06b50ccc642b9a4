/* ************************************************************************ **
** This file is part of atomkit, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of atomkit is provided under this permissive       **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

// Glue between config files, the library crates, and the command line.

#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate serde_derive;
#[macro_use] extern crate clap;
#[cfg(test)] #[macro_use] extern crate atomkit_assert_close;

pub type FailResult<T> = Result<T, failure::Error>;

pub use atomkit_tasks_config as config;

mod logging;
pub mod cmd;
pub mod entry_points;

pub use crate::logging::{GlobalLogger, ColorizedLevel};
