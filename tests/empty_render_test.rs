#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use common::test_utils::{Checked, Frame, f_to_u8};
    use flow_sketches::{
        context::{Context, InitContext},
        flow::{GraphicsFlow, ImageTestResult, Out},
        render::Render,
    };
    use wgpu::Color;

    struct Empty;
    impl GraphicsFlow<(), ()> for Empty {
        fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
            ctx.clear_colour = Color::WHITE;
            Out::Empty
        }

        fn on_render<'pass>(&self) -> Render<'_, 'pass> {
            Render::None
        }
    }

    fn all_white(texture: &Frame) -> ImageTestResult {
        let colour = Color::WHITE;
        let desired = image::Rgba([
            f_to_u8(colour.r),
            f_to_u8(colour.g),
            f_to_u8(colour.b),
            f_to_u8(colour.a),
        ]);
        for pixel in texture.pixels() {
            assert_eq!(*pixel, desired);
        }
        ImageTestResult::Passed
    }

    golden_image_test!((), (), |_: InitContext| Checked::new(Box::new(Empty), all_white));
}
