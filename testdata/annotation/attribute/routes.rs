use fixtures::Sample;

#[Sample("attribute", priority = 1)]
pub struct Routes {
    #[Sample("property")]
    pub prefix: String,
}

impl Routes {
    #[Sample("constant")]
    pub const VERSION: u32 = 2;

    #[Sample(name = "specific_name")]
    pub fn index(&self) {}

    #[Sample("specific_none", priority = 14)]
    pub fn show(&self, id: u32) {}
}
