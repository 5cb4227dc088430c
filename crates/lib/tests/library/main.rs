mod common;
mod promote_tests;
