use tarrasch::utils::cli::HostCommand;
use tarrasch::{EngineColor, GameController, Side};

fn main() {
    env_logger::init();

    println!("tarrasch {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    println!("you play against the engine; it has the white pieces");
    println!("commands: new, board, moves, move <from> <to> [qnbr], best, perft <depth>, quit");

    let color = EngineColor::White;
    let mut controller = GameController::new(color);

    loop {
        let Some(command) = HostCommand::receive(color) else {
            break;
        };

        match command {
            HostCommand::Quit => break,
            HostCommand::NewGame => {
                controller.new_game();
                println!("{}", controller.board.render());
            }
            HostCommand::ShowBoard => println!("{}", controller.board.render()),
            HostCommand::ListMoves => {
                let side = controller.side_to_move();
                let moves = controller.legal_moves_for(side);
                let notated = moves
                    .iter()
                    .map(|board_move| controller.notation(board_move))
                    .collect::<Vec<_>>();
                println!("{}", notated.join(" "));
            }
            HostCommand::Perft(depth) => {
                for (board_move, nodes) in controller.perft_divide(depth) {
                    println!("{}: {}", controller.notation(&board_move), nodes);
                }
                println!("total: {}", controller.perft(depth));
            }
            HostCommand::Best => {
                if controller.side_to_move() != Side::Engine {
                    println!("it is not the engine's turn");
                    continue;
                }
                engine_reply(&mut controller);
            }
            HostCommand::Play { from, to, promotion } => {
                if controller.side_to_move() != Side::Player {
                    println!("it is not your turn (try 'best')");
                    continue;
                }

                let chosen = controller
                    .legal_moves_for(Side::Player)
                    .into_iter()
                    .find(|candidate| {
                        candidate.from == from
                            && candidate.to == to
                            && (!candidate.kind.is_promotion() || candidate.kind == promotion)
                    });

                match chosen {
                    None => println!("illegal move"),
                    Some(board_move) => {
                        println!("you play {}", controller.notation(&board_move));
                        controller.apply_move(&board_move);

                        if report_if_over(&mut controller) {
                            continue;
                        }
                        engine_reply(&mut controller);
                    }
                }
            }
            HostCommand::Invalid(input) => println!("unrecognized command: {}", input.trim()),
        }
    }
}

fn engine_reply(controller: &mut GameController) {
    match controller.choose_best_move() {
        None => {
            report_if_over(controller);
        }
        Some(board_move) => {
            println!("engine plays {}", controller.notation(&board_move));
            controller.apply_move(&board_move);
            println!("{}", controller.board.render());
            report_if_over(controller);
        }
    }
}

/// Announce check, mate or stalemate; true when the game is over.
fn report_if_over(controller: &mut GameController) -> bool {
    let side = controller.side_to_move();
    if !controller.legal_moves_for(side).is_empty() {
        if controller.in_check(side) {
            println!("check!");
        }
        return false;
    }

    if controller.in_check(side) {
        match side {
            Side::Player => println!("checkmate, the engine wins"),
            Side::Engine => println!("checkmate, you win"),
        }
    } else {
        println!("stalemate");
    }
    true
}
