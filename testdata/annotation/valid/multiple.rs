use fixtures::Sample;

#[Sample("multiple_1", priority = 10)]
#[Sample("multiple_2", priority = 20)]
pub struct MultipleMethod {
    #[Sample("property")]
    value: u32,
}

impl MultipleMethod {
    #[Sample("limit")]
    pub const LIMIT: u32 = 5;

    #[Sample("start")]
    pub fn start(&self) {}

    pub fn untagged(&self) {}

    #[Sample("end", priority = 4)]
    pub fn end(&self) {}
}
