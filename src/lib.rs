// Turns per-site cache-probing timing CSVs into labeled datasets. Each input
// file holds one timing per row; a non-empty second column marks the first row
// of a probe and carries its sample count.

pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod pipeline;
pub mod report;
