#[cfg(test)]
pub mod common;







#[cfg(test)]
mod test_properties;
