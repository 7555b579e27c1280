//! # tfp_hcl
//!
//! A small, ordered HCL document builder used to assemble `main.tf` files.
//!
//! The builder keeps items in insertion order so that generating the same
//! configuration twice yields byte-identical output. Object values are
//! rendered with sorted keys.
//!
//! ## Example
//!
//! ```rust
//! use tfp_hcl::{HclFile, Value};
//!
//! let mut file = HclFile::new();
//! let root = file.body_mut();
//!
//! let provider = root.append_block("provider", &["rancher2"]);
//! provider.set_attribute_value("api_url", "https://rancher.example.com");
//! provider.set_attribute_value("insecure", true);
//!
//! assert!(file.to_string().contains(r#"provider "rancher2" {"#));
//! ```

pub mod body;
pub mod error;
pub mod format;
pub mod render;
pub mod value;

pub use body::{Block, Body, Expression, HclFile, Item};
pub use error::{HclError, HclResult};
pub use format::{list_of_strings, traversal};
pub use value::Value;
