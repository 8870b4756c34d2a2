//! Standings computation, derived on demand from player aggregates.

use parity_types::{Player, Standing};

/// Compute ranked standings from registration-ordered players.
///
/// Sort key is `(points, wins, draws)` descending. The sort is stable, so
/// players fully tied on all three keys stay in registration order; ranks
/// are assigned by position and never shared.
pub fn compute_standings<'a>(players: impl Iterator<Item = &'a Player>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = players
        .map(|player| Standing {
            rank: 0,
            player_id: player.id.clone(),
            display_name: player.meta.display_name.clone(),
            played: player.stats.played(),
            wins: player.stats.wins,
            draws: player.stats.draws,
            losses: player.stats.losses,
            points: player.stats.points_earned,
        })
        .collect();

    standings.sort_by(|a, b| {
        (b.points, b.wins, b.draws).cmp(&(a.points, a.wins, a.draws))
    });

    for (index, standing) in standings.iter_mut().enumerate() {
        standing.rank = index as u32 + 1;
    }

    standings
}
