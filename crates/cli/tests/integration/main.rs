mod plan_tests;
#[cfg(unix)]
mod promote_tests;
