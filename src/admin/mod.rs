/*
 * Back office helpers: the list columns shown to staff
 * and the CSV exports.
 */

pub mod display;
pub mod export;
