#[cfg(test)]
mod container_tests;
#[cfg(test)]
mod provider_tests;
