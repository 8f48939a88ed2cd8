pub mod admin {
    use fixtures::Sample;

    pub struct Controller;

    impl Controller {
        pub fn show(
            &self,
            #[Sample("admin_parameter", priority = 2)] parameter: u32,
            #[Sample("admin_ignored")] other: u32,
        ) {
        }
    }
}
