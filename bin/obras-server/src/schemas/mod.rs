pub mod obras;
