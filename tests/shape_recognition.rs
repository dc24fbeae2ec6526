use std::f32::consts::TAU;

use egui::{Pos2, pos2};
use inkshape::event::EventRecorder;
use inkshape::{DrawingSession, EditorEvent, InputEvent, ShapeKind};

fn session_with_detection() -> (DrawingSession, EventRecorder) {
    let mut session = DrawingSession::new(240, 220).unwrap();
    session.set_shape_detection(true).unwrap();
    let recorder = EventRecorder::new();
    session.event_bus().subscribe(Box::new(recorder.clone()));
    (session, recorder)
}

fn draw(session: &mut DrawingSession, points: &[Pos2]) {
    session
        .handle_input(InputEvent::PointerDown { position: points[0] })
        .unwrap();
    for point in &points[1..] {
        session
            .handle_input(InputEvent::PointerMove { position: *point })
            .unwrap();
    }
    session.handle_input(InputEvent::PointerUp).unwrap();
}

fn recognized(recorder: &EventRecorder) -> Vec<ShapeKind> {
    recorder
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::ShapeRecognized { kind } => Some(kind),
            _ => None,
        })
        .collect()
}

#[test]
fn test_freehand_circle_becomes_clean_circle() {
    let (mut session, recorder) = session_with_detection();
    let center = pos2(100.0, 100.0);
    let radius = 50.0;
    let points: Vec<Pos2> = (0..40)
        .map(|i| {
            let a = TAU * i as f32 / 40.0;
            pos2(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect();

    draw(&mut session, &points);

    assert_eq!(recognized(&recorder), vec![ShapeKind::Circle]);
    assert_eq!(session.history().len(), 2);

    // Only the idealized outline is left; the raw polyline ink is gone.
    let width = session.tools().width();
    let raster = session.raster();
    let mut inked = 0;
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            if raster.alpha_at(x, y).unwrap() == 0 {
                continue;
            }
            inked += 1;
            let d = pos2(x as f32 + 0.5, y as f32 + 0.5).distance(center);
            assert!((d - radius).abs() <= width / 2.0 + 1.5, "ink at ({x}, {y}) is {d} from center");
        }
    }
    assert!(inked > 0);
}

#[test]
fn test_freehand_square() {
    let (mut session, recorder) = session_with_detection();
    let corners = [
        pos2(10.0, 10.0),
        pos2(110.0, 10.0),
        pos2(110.0, 110.0),
        pos2(10.0, 110.0),
        pos2(10.0, 14.0),
    ];
    let mut points = Vec::new();
    for edge in corners.windows(2) {
        for k in 0..8 {
            points.push(edge[0].lerp(edge[1], k as f32 / 8.0));
        }
    }
    points.push(corners[4]);

    draw(&mut session, &points);

    assert_eq!(recognized(&recorder), vec![ShapeKind::Square]);
    let raster = session.raster();
    assert!(raster.alpha_at(60, 10).unwrap() > 0);
    assert!(raster.alpha_at(110, 60).unwrap() > 0);
    assert_eq!(raster.alpha_at(60, 60), Some(0));
}

#[test]
fn test_unrecognized_stroke_keeps_raw_ink() {
    let (mut session, recorder) = session_with_detection();
    let points: Vec<Pos2> = (0..30)
        .map(|i| pos2(10.0 + i as f32 * 7.0, if i % 10 < 5 { 40.0 } else { 100.0 }))
        .collect();

    draw(&mut session, &points);

    assert!(recognized(&recorder).is_empty());
    assert_eq!(session.history().len(), 2);
    assert!(!session.raster().is_blank());
}

#[test]
fn test_detection_off_commits_raw_ink() {
    let (mut session, recorder) = session_with_detection();
    session.set_shape_detection(false).unwrap();
    let points: Vec<Pos2> = (0..=20).map(|i| pos2(10.0 + i as f32 * 10.0, 50.0)).collect();

    draw(&mut session, &points);

    assert!(recognized(&recorder).is_empty());
    assert_eq!(session.history().len(), 2);
}
