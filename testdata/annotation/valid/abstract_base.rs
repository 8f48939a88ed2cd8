use fixtures::Sample;

#[Sample("abstract")]
pub trait AbstractBase {
    #[Sample("never")]
    fn run(&self);

    #[Sample("provided")]
    fn describe(&self) -> String {
        String::new()
    }
}
