//! Replay behavior across devices and threads

use folio_core::{Cookie, FolioError, IRect, Matrix, Point, Rect};
use folio_render::{
    Color, Command, Device, DisplayList, DrawDevice, Path, PageSource, Pixmap, RunStatus,
    StrokeStyle, SvgDevice, SvgDeviceOptions, TextSpan,
};

/// Two-page source with a fixed mix of commands.
struct Fixture;

impl PageSource for Fixture {
    fn page_count(&self) -> usize {
        2
    }

    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect> {
        if page >= 2 {
            return Err(FolioError::out_of_range("page", page, 2));
        }
        Ok(Rect::from_size(200.0, 100.0))
    }

    fn run_page(
        &self,
        page: usize,
        device: &mut dyn Device,
        ctm: &Matrix,
    ) -> folio_core::Result<()> {
        self.page_bounds(page)?;
        device.draw(
            &Command::ClipPath {
                path: Path::rect(&Rect::new(0.0, 0.0, 150.0, 100.0)),
                even_odd: false,
            },
            ctm,
        )?;
        device.draw(
            &Command::FillPath {
                path: Path::rect(&Rect::new(10.0, 10.0, 40.0, 40.0)),
                even_odd: false,
                color: Color::rgb(0.2, 0.4, 0.6),
            },
            ctm,
        )?;
        let mut line = Path::new();
        line.move_to(0.0, 50.0);
        line.line_to(200.0, 50.0);
        device.draw(
            &Command::StrokePath {
                path: line,
                stroke: StrokeStyle::with_width(2.0),
                color: Color::BLACK,
            },
            ctm,
        )?;
        device.draw(&Command::PopClip, ctm)?;
        let label = format!("page {}", page + 1);
        device.draw(
            &Command::FillText {
                span: TextSpan::new(label, "sans-serif", 10.0, Point::new(5.0, 95.0)),
                color: Color::BLACK,
            },
            ctm,
        )?;
        Ok(())
    }
}

fn draw_device() -> DrawDevice {
    DrawDevice::new(Pixmap::new(IRect::new(0, 0, 400, 200)).unwrap())
}

#[test]
fn test_record_page() {
    let list = DisplayList::record(&Fixture, 0).unwrap();
    assert_eq!(list.len(), 5);
    assert_eq!(list.bounds(), Rect::from_size(200.0, 100.0));
    assert!(DisplayList::record(&Fixture, 2).is_err());
}

#[test]
fn test_replay_is_deterministic_across_devices() {
    let list = DisplayList::record(&Fixture, 1).unwrap();
    let ctm = Matrix::scale(2.0, 2.0);

    let mut first = draw_device();
    let mut second = draw_device();
    list.render_page(&mut first, &ctm, None).unwrap();
    list.render_page(&mut second, &ctm, None).unwrap();

    assert_eq!(first.trace(), second.trace());
    assert_eq!(first.culled(), second.culled());
    assert_eq!(first.trace().len(), 5);
}

#[test]
fn test_replay_of_clone_matches_original() {
    let list = DisplayList::record(&Fixture, 0).unwrap();
    let copy = list.clone();
    let mut a = draw_device();
    let mut b = draw_device();
    list.render_page(&mut a, &Matrix::IDENTITY, None).unwrap();
    copy.render_page(&mut b, &Matrix::IDENTITY, None).unwrap();
    assert_eq!(a.trace(), b.trace());
}

#[test]
fn test_abort_from_another_thread() {
    let mut list = DisplayList::new(Rect::from_size(100.0, 100.0));
    for _ in 0..1000 {
        list.push(
            Command::FillPath {
                path: Path::rect(&Rect::new(0.0, 0.0, 1.0, 1.0)),
                even_odd: false,
                color: Color::BLACK,
            },
            Matrix::IDENTITY,
        );
    }
    let cookie = Cookie::new();
    let remote = cookie.share();
    std::thread::spawn(move || remote.abort()).join().unwrap();

    let mut dev = draw_device();
    let status = list
        .render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
        .unwrap();
    assert_eq!(status, RunStatus::Aborted { at: 0 });

    cookie.reset();
    let mut dev = draw_device();
    let status = list
        .render_page(&mut dev, &Matrix::IDENTITY, Some(&cookie))
        .unwrap();
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(cookie.progress_percent(), 100);
}

#[test]
fn test_svg_output_per_page() {
    let mut dev = SvgDevice::new(Vec::new(), SvgDeviceOptions::default()).unwrap();
    for page in 0..Fixture.page_count() {
        let list = DisplayList::record(&Fixture, page).unwrap();
        list.render_page(&mut dev, &Matrix::IDENTITY, None).unwrap();
    }
    dev.close().unwrap();
    let svg = String::from_utf8(dev.into_inner()).unwrap();
    assert_eq!(svg.matches("<svg ").count(), 2);
    assert!(svg.contains(">page 1</text>"));
    assert!(svg.contains(">page 2</text>"));
    assert!(svg.contains("stroke-width=\"2\""));
}
