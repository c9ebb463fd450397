#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTML parsers for the card database pages.
//!
//! All parsers are pure functions over a [`dom::DomNode`]: they never fetch
//! anything and never fail the whole page because of one bad record. A row
//! or detail page that lacks a required field is reported as `None`.
//!
//! - [`card`]: card search-result rows
//! - [`faq`]: FAQ detail pages and FAQ id lists
//! - [`supplement`]: card Q&A pages
//! - [`field_mapping`]: site tokens to canonical enums
//! - [`normalize`]: search-name folding

pub mod card;
pub mod dom;
pub mod faq;
pub mod field_mapping;
pub mod normalize;
pub mod supplement;

pub use card::{CardListPage, parse_card_list_page, parse_card_row};
pub use faq::{parse_faq_detail, parse_faq_detail_html, parse_faq_id_list};
pub use normalize::normalize_name;
pub use supplement::{parse_card_supplement, parse_card_supplement_html};
