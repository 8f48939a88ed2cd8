use fixtures::Sample;

pub enum Level {
    #[Sample("level_low")]
    Low,
    High,
}
