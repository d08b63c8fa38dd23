//! Memory card grid reveal
//!
//! Each card fades in and slides up when its top edge crosses 85% of the
//! viewport, staggered by its position in the grid. Scrolling back above
//! the line reverses it ("play none none reverse").

use super::trigger::{LineTrigger, TriggerEvent};
use super::tween::Fade;

/// Line at which cards start revealing
pub const REVEAL_LINE: f32 = 0.85;

/// Initial downward offset of a hidden card, logical px
pub const CARD_DROP: f32 = 30.0;

const REVEAL_DURATION: f32 = 0.8;
const STAGGER: f32 = 0.1;

#[derive(Debug, Clone)]
struct Card {
    trigger: LineTrigger,
    fade: Fade,
    delay: f32,
}

/// Reveal state for every card in the grid
#[derive(Debug, Clone)]
pub struct CardReveal {
    cards: Vec<Card>,
}

impl CardReveal {
    pub fn new(count: usize) -> Self {
        let cards = (0..count)
            .map(|i| Card {
                trigger: LineTrigger::new(REVEAL_LINE),
                fade: Fade::new(0.0, CARD_DROP),
                delay: i as f32 * STAGGER,
            })
            .collect();
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// `card_tops[i]` is card i's top edge in viewport coordinates
    pub fn update(&mut self, card_tops: &[f32], viewport_height: f32) {
        for (card, &top) in self.cards.iter_mut().zip(card_tops) {
            match card.trigger.update(top, viewport_height) {
                Some(TriggerEvent::Enter) => card.fade.to(1.0, 0.0, REVEAL_DURATION, card.delay),
                Some(TriggerEvent::LeaveBack) => {
                    card.fade.to(0.0, CARD_DROP, REVEAL_DURATION, card.delay)
                }
                _ => {}
            }
        }
    }

    pub fn tick(&mut self, dt: f32) {
        for card in &mut self.cards {
            card.fade.tick(dt);
        }
    }

    /// (opacity, vertical offset) of card `index`
    pub fn appearance(&self, index: usize) -> (f32, f32) {
        self.cards
            .get(index)
            .map(|c| (c.fade.opacity.value(), c.fade.offset_y.value()))
            .unwrap_or((0.0, CARD_DROP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_reveal_with_stagger() {
        let mut reveal = CardReveal::new(3);
        reveal.update(&[500.0, 500.0, 500.0], 1000.0);

        // First card starts immediately, third waits 0.2s
        reveal.tick(0.1);
        let (o0, _) = reveal.appearance(0);
        let (o2, y2) = reveal.appearance(2);
        assert!(o0 > 0.0);
        assert_eq!(o2, 0.0);
        assert_eq!(y2, CARD_DROP);

        reveal.tick(2.0);
        for i in 0..3 {
            assert_eq!(reveal.appearance(i), (1.0, 0.0));
        }
    }

    #[test]
    fn test_cards_below_line_stay_hidden() {
        let mut reveal = CardReveal::new(2);
        reveal.update(&[900.0, 1200.0], 1000.0);
        reveal.tick(1.0);
        assert_eq!(reveal.appearance(0), (0.0, CARD_DROP));
        assert_eq!(reveal.appearance(1), (0.0, CARD_DROP));
    }

    #[test]
    fn test_reverse_on_scroll_back() {
        let mut reveal = CardReveal::new(1);
        reveal.update(&[100.0], 1000.0);
        reveal.tick(1.0);
        assert_eq!(reveal.appearance(0), (1.0, 0.0));

        reveal.update(&[950.0], 1000.0);
        reveal.tick(1.0);
        assert_eq!(reveal.appearance(0), (0.0, CARD_DROP));
    }
}
