use fixtures::Sample;

#[Sample("single")]
pub struct SingleClass;
