use retro_binds_macros::bind_export;

#[bind_export(namespace = "retro")]
pub trait MathModule {
    fn add(&self, a: i32, b: i32) -> i32;

    fn lerp(&self, from: f32, to: f32, t: f32) -> f32;

    /// Sum of `count` values starting at `values`.
    fn sum(&self, values: *const i32, count: i32) -> i64;
}
