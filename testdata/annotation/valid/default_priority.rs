use fixtures::Sample;

pub struct DefaultPriorityClass {
    #[Sample("public_property")]
    pub name: String,
    #[Sample("private_property", priority = 4)]
    secret: String,
    count: u32,
}

impl DefaultPriorityClass {
    #[Sample("handle")]
    pub fn handle(&self) {}

    pub fn untagged(&self, value: u32) -> u32 {
        value
    }

    #[Sample(name = "priority", priority = 323)]
    fn internal(&self) {}
}
