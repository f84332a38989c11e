pub mod header;
pub mod metric_card;
pub mod share_bar;
