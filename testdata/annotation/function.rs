use fixtures::Sample;

#[Sample("function")]
pub fn handler(#[Sample(name = "function_parameter", priority = 4)] parameter: String, other: u8) {}

pub fn untagged(value: u8) {}
