pub mod pandapower;

#[cfg(test)]
mod tests;
