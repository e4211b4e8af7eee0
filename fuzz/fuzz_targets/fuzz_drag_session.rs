#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use strata_layout::{
    BandSet, CanvasFrame, DragCancelReason, DragController, DragEffect, Node, Point,
    TierSet, add_custom_tier, default_tiers,
};

#[derive(Debug, Arbitrary)]
enum Step {
    Move { x: f64, y: f64 },
    End { x: f64, y: f64 },
    Cancel,
    Restart,
}

#[derive(Debug, Arbitrary)]
struct Input {
    extra_tiers: u8,
    canvas_height: u16,
    locked: bool,
    start_y: f64,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let mut tiers: TierSet = default_tiers();
    for _ in 0..(input.extra_tiers % 8) {
        tiers = add_custom_tier(&tiers);
    }
    let frame = CanvasFrame::default().with_height(f64::from(input.canvas_height.max(200)));
    let bands = BandSet::for_tiers(&tiers, &frame);

    let tier = if input.locked { tiers[0].id.clone() } else { tiers[1].id.clone() };
    let mut node = Node::new("n", tier.as_str(), Point::new(100.0, input.start_y));
    node.is_locked = input.locked;

    let mut controller = DragController::default();
    controller.start(&node);
    for step in input.steps.iter().take(256) {
        let transition = match step {
            Step::Move { x, y } => controller.drag_to(&node.id, Point::new(*x, *y), &bands),
            Step::End { x, y } => controller.end(&node.id, Point::new(*x, *y), &bands),
            Step::Cancel => controller.cancel(&node.id, DragCancelReason::PointerCancel),
            Step::Restart => controller.start(&node),
        };
        match &transition.effect {
            DragEffect::Moved { tier_id, position, .. } => {
                assert!(tiers.contains(tier_id), "unknown tier during drag");
                assert!(!position.y.is_nan(), "NaN position");
                if input.locked {
                    assert!(tier_id.is_foundational(), "locked node left foundation");
                } else {
                    assert!(!tier_id.is_foundational(), "free node entered foundation");
                }
            }
            DragEffect::Committed { correction } => {
                let tier_id = correction.tier_id.as_ref().expect("commit carries tier");
                let band = bands.get(tier_id).expect("committed tier has band");
                assert!(
                    band.span().contains_inclusive(correction.y_position),
                    "commit outside band"
                );
            }
            _ => {}
        }
    }
});
