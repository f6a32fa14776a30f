#[cfg(test)]
mod kernel_tests;
#[cfg(test)]
mod schedule_tests;
