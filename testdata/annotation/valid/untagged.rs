pub struct Plain {
    value: u8,
}

impl Plain {
    #[inline]
    pub fn run(&self) -> u8 {
        self.value
    }
}
