pub mod client;
pub mod pager;

pub use client::{NewsClient, NewsItem, NewsPage};
pub use pager::NewsPager;
