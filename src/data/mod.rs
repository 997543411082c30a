// src/data/mod.rs

//! The `data` module is the specialized data containers for
//! user-accounting records.
//!
//! ## Definitions of data
//!
//! ### Utent
//!
//! A "utent" is one entry of the user-accounting database; one fixed-size
//! record of a `utmp` (or `wtmp`, `btmp`) file. The underlying record is
//! a platform-defined C struct. A decoded record is represented by a
//! [`Utent`] and is read from a file by a [`UtentReader`].
//!
//! A `Utent` owns all of its field data; it holds no references into the
//! buffer it was decoded from.
//!
//! <br/>
//!
//! _The "Readers" are not rust "Readers"; "_Reader_" structs do not
//! implement the trait [`Read`]. These are "readers" in an informal
//! sense._
//!
//! [`Utent`]: crate::data::utent::Utent
//! [`UtentReader`]: crate::readers::utentreader::UtentReader
//! [`Read`]: std::io::Read

pub mod datetime;
pub mod utent;
