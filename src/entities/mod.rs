pub mod library_item;
