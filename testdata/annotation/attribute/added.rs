use fixtures::Sample as Tag;

#[Tag("attribute_added")]
pub struct AddedRoutes {
    #[Tag("property")]
    pub prefix: String,
}

impl AddedRoutes {
    #[Tag("specific_none", priority = 14)]
    pub fn show(&self) {}
}
