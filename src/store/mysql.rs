//! MySQL-backed store.

use async_trait::async_trait;
use chrono::Local;
use log::{debug, info};
use sqlx::mysql::{MySql, MySqlPool};
use sqlx::Transaction;

use crate::engine::layout::Layout;
use crate::engine::registry::{plan_challenge, ChallengePlan};
use crate::engine::ships::{Coordinate, ShipKind};
use crate::engine::turn::{TurnAuthority, TurnToken};
use crate::models::battle::{Battle, BattleId, BattleStatus};
use crate::models::board::{Board, BoardId, Marker, PinColor};
use crate::models::player::{Player, PlayerId};
use crate::store::{Store, StoreError, StrikeCommit};

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS players (
        id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        screen_name VARCHAR(16) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)",
    "CREATE TABLE IF NOT EXISTS boards (
        id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        player_id INT UNSIGNED NOT NULL,
        name VARCHAR(32) NOT NULL,
        created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX (player_id))",
    "CREATE TABLE IF NOT EXISTS positions (
        board_id INT UNSIGNED NOT NULL,
        coord_row TINYINT UNSIGNED NOT NULL,
        coord_col CHAR(1) NOT NULL,
        ship CHAR(1) NOT NULL,
        PRIMARY KEY (board_id, coord_row, coord_col))",
    "CREATE TABLE IF NOT EXISTS battles (
        id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        challenger_id INT UNSIGNED NOT NULL,
        challenger_board_id INT UNSIGNED NOT NULL,
        opponent_id INT UNSIGNED NOT NULL,
        opponent_board_id INT UNSIGNED NULL,
        status TINYINT UNSIGNED NOT NULL,
        mover_id INT UNSIGNED NULL,
        turn_token VARCHAR(64) NULL,
        challenger_sunk TINYINT UNSIGNED NOT NULL DEFAULT 0,
        opponent_sunk TINYINT UNSIGNED NOT NULL DEFAULT 0,
        winner_id INT UNSIGNED NULL,
        challenged TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX (challenger_id),
        INDEX (opponent_id))",
    "CREATE TABLE IF NOT EXISTS markers (
        battle_id INT UNSIGNED NOT NULL,
        board_id INT UNSIGNED NOT NULL,
        coord_row TINYINT UNSIGNED NOT NULL,
        coord_col CHAR(1) NOT NULL,
        pin TINYINT UNSIGNED NOT NULL,
        PRIMARY KEY (battle_id, board_id, coord_row, coord_col))",
];

const BATTLE_COLUMNS: &str = "id, challenger_id, challenger_board_id, opponent_id, opponent_board_id, \
    status, mover_id, turn_token, challenger_sunk, opponent_sunk, winner_id, challenged";

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: u32,
    player_id: u32,
    name: String,
    created: chrono::DateTime<Local>,
}

#[derive(sqlx::FromRow)]
struct PositionRow {
    coord_row: u8,
    coord_col: String,
    ship: String,
}

#[derive(sqlx::FromRow)]
struct MarkerRow {
    coord_row: u8,
    coord_col: String,
    pin: u8,
}

#[derive(sqlx::FromRow)]
struct BattleRow {
    id: u32,
    challenger_id: u32,
    challenger_board_id: u32,
    opponent_id: u32,
    opponent_board_id: Option<u32>,
    status: u8,
    mover_id: Option<u32>,
    turn_token: Option<String>,
    challenger_sunk: u8,
    opponent_sunk: u8,
    winner_id: Option<u32>,
    challenged: chrono::DateTime<Local>,
}

impl TryFrom<BattleRow> for Battle {
    type Error = StoreError;

    fn try_from(row: BattleRow) -> Result<Self, Self::Error> {
        let status = BattleStatus::from_code(row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("battle {} has status {}", row.id, row.status)))?;
        let turn = match (row.mover_id, row.turn_token) {
            (Some(mover), Some(token)) => {
                Some(TurnAuthority::from_stored(mover, TurnToken::from_stored(token)))
            }
            _ => None,
        };
        Ok(Battle {
            id: row.id,
            challenger_id: row.challenger_id,
            challenger_board_id: row.challenger_board_id,
            opponent_id: row.opponent_id,
            opponent_board_id: row.opponent_board_id,
            status,
            turn,
            challenger_sunk: row.challenger_sunk,
            opponent_sunk: row.opponent_sunk,
            winner: row.winner_id,
            challenged: row.challenged,
        })
    }
}

fn stored_cell(row: u8, col: &str) -> Result<Coordinate, StoreError> {
    let letter = col
        .chars()
        .next()
        .ok_or_else(|| StoreError::Corrupt("empty column".to_string()))?;
    Coordinate::new(row, letter)
        .map_err(|_| StoreError::Corrupt(format!("cell {}{} is off the board", row, col)))
}

fn is_duplicate(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23000"),
        _ => false,
    }
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_url: &str) -> Result<MySqlStore, StoreError> {
        let pool = MySqlPool::connect(database_url).await?;
        Ok(MySqlStore { pool })
    }

    /// Creates the tables that do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is in place");
        Ok(())
    }

    async fn layout(&self, board: BoardId) -> Result<Layout, StoreError> {
        let sql = "SELECT coord_row, coord_col, ship FROM positions WHERE board_id = ?";
        let rows = sqlx::query_as::<_, PositionRow>(sql)
            .bind(board)
            .fetch_all(&self.pool)
            .await?;
        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let cell = stored_cell(row.coord_row, &row.coord_col)?;
            let kind = row
                .ship
                .chars()
                .next()
                .and_then(ShipKind::from_symbol)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown ship {:?} on board {}", row.ship, board)))?;
            cells.push((cell, kind));
        }
        Ok(Layout::from_cells(cells))
    }

    async fn into_board(&self, row: BoardRow) -> Result<Board, StoreError> {
        let layout = self.layout(row.id).await?;
        Ok(Board {
            id: row.id,
            player_id: row.player_id,
            name: row.name,
            created: row.created,
            layout,
        })
    }

    /// Locks both player rows so challenges between the same pair run one at a
    /// time.
    async fn lock_pair(
        tx: &mut Transaction<'static, MySql>,
        a: PlayerId,
        b: PlayerId,
    ) -> Result<(), StoreError> {
        sqlx::query("SELECT id FROM players WHERE id IN (?, ?) ORDER BY id FOR UPDATE")
            .bind(a)
            .bind(b)
            .fetch_all(&mut *tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn insert_player(
        &self,
        screen_name: &str,
        password_hash: &str,
    ) -> Result<PlayerId, StoreError> {
        let sql = "INSERT INTO players (screen_name, password_hash) VALUES (?, ?)";
        match sqlx::query(sql)
            .bind(screen_name)
            .bind(password_hash)
            .execute(&self.pool)
            .await
        {
            Ok(result) => Ok(result.last_insert_id() as PlayerId),
            Err(err) if is_duplicate(&err) => Err(StoreError::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        let sql = "SELECT * FROM players WHERE id = ?";
        Ok(sqlx::query_as::<_, Player>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn player_by_name(&self, screen_name: &str) -> Result<Option<Player>, StoreError> {
        let sql = "SELECT * FROM players WHERE screen_name = ?";
        Ok(sqlx::query_as::<_, Player>(sql)
            .bind(screen_name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn players(&self) -> Result<Vec<Player>, StoreError> {
        let sql = "SELECT * FROM players ORDER BY screen_name";
        Ok(sqlx::query_as::<_, Player>(sql).fetch_all(&self.pool).await?)
    }

    async fn insert_board(
        &self,
        player: PlayerId,
        name: &str,
        layout: &Layout,
    ) -> Result<BoardId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = "INSERT INTO boards (player_id, name) VALUES (?, ?)";
        let board_id = sqlx::query(sql)
            .bind(player)
            .bind(name)
            .execute(&mut tx)
            .await?
            .last_insert_id() as BoardId;

        let sql = "INSERT INTO positions (board_id, coord_row, coord_col, ship) VALUES (?, ?, ?, ?)";
        for (cell, kind) in layout.iter() {
            sqlx::query(sql)
                .bind(board_id)
                .bind(cell.row())
                .bind(cell.col().to_string())
                .bind(kind.symbol().to_string())
                .execute(&mut tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Stored {} positions for board {}", layout.len(), board_id);
        Ok(board_id)
    }

    async fn board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        let sql = "SELECT id, player_id, name, created FROM boards WHERE id = ?";
        let row = sqlx::query_as::<_, BoardRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.into_board(row).await?)),
            None => Ok(None),
        }
    }

    async fn boards_of(&self, player: PlayerId) -> Result<Vec<Board>, StoreError> {
        let sql = "SELECT id, player_id, name, created FROM boards WHERE player_id = ? ORDER BY id DESC";
        let rows = sqlx::query_as::<_, BoardRow>(sql)
            .bind(player)
            .fetch_all(&self.pool)
            .await?;
        let mut boards = Vec::with_capacity(rows.len());
        for row in rows {
            boards.push(self.into_board(row).await?);
        }
        Ok(boards)
    }

    async fn open_challenge(
        &self,
        challenger: PlayerId,
        challenger_board: BoardId,
        opponent: PlayerId,
    ) -> Result<BattleId, StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_pair(&mut tx, challenger, opponent).await?;

        let sql = format!(
            "SELECT {} FROM battles WHERE ((challenger_id = ? AND opponent_id = ?) OR (challenger_id = ? AND opponent_id = ?)) \
             AND status IN (?, ?) ORDER BY id DESC LIMIT 1 FOR UPDATE",
            BATTLE_COLUMNS
        );
        let open = sqlx::query_as::<_, BattleRow>(&sql)
            .bind(challenger)
            .bind(opponent)
            .bind(opponent)
            .bind(challenger)
            .bind(BattleStatus::Pending.code())
            .bind(BattleStatus::Active.code())
            .fetch_optional(&mut tx)
            .await?
            .map(Battle::try_from)
            .transpose()?;

        let id = match plan_challenge(open.as_ref(), challenger) {
            ChallengePlan::Keep(id) => id,
            ChallengePlan::RefreshBoard(id) => {
                let sql = "UPDATE battles SET challenger_board_id = ? WHERE id = ? AND challenger_id = ?";
                sqlx::query(sql)
                    .bind(challenger_board)
                    .bind(id)
                    .bind(challenger)
                    .execute(&mut tx)
                    .await?;
                id
            }
            ChallengePlan::Create => {
                let sql = "INSERT INTO battles (challenger_id, challenger_board_id, opponent_id, status) VALUES (?, ?, ?, ?)";
                sqlx::query(sql)
                    .bind(challenger)
                    .bind(challenger_board)
                    .bind(opponent)
                    .bind(BattleStatus::Pending.code())
                    .execute(&mut tx)
                    .await?
                    .last_insert_id() as BattleId
            }
        };

        tx.commit().await?;
        Ok(id)
    }

    async fn battle(&self, id: BattleId) -> Result<Option<Battle>, StoreError> {
        let sql = format!("SELECT {} FROM battles WHERE id = ?", BATTLE_COLUMNS);
        sqlx::query_as::<_, BattleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Battle::try_from)
            .transpose()
    }

    async fn battles_of(&self, player: PlayerId) -> Result<Vec<Battle>, StoreError> {
        let sql = format!(
            "SELECT {} FROM battles WHERE challenger_id = ? OR opponent_id = ? ORDER BY id DESC",
            BATTLE_COLUMNS
        );
        sqlx::query_as::<_, BattleRow>(&sql)
            .bind(player)
            .bind(player)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Battle::try_from)
            .collect()
    }

    async fn accept_battle(
        &self,
        id: BattleId,
        opponent: PlayerId,
        opponent_board: BoardId,
        turn: &TurnAuthority,
    ) -> Result<(), StoreError> {
        let sql = "UPDATE battles SET opponent_board_id = ?, status = ?, mover_id = ?, turn_token = ? \
                   WHERE id = ? AND opponent_id = ? AND status = ?";
        let result = sqlx::query(sql)
            .bind(opponent_board)
            .bind(BattleStatus::Active.code())
            .bind(turn.mover())
            .bind(turn.token().as_str())
            .bind(id)
            .bind(opponent)
            .bind(BattleStatus::Pending.code())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    async fn decline_battle(&self, id: BattleId, opponent: PlayerId) -> Result<(), StoreError> {
        let sql = "UPDATE battles SET status = ? WHERE id = ? AND opponent_id = ? AND status = ?";
        let result = sqlx::query(sql)
            .bind(BattleStatus::Declined.code())
            .bind(id)
            .bind(opponent)
            .bind(BattleStatus::Pending.code())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    async fn markers(&self, battle: BattleId, board: BoardId) -> Result<Vec<Marker>, StoreError> {
        let sql = "SELECT coord_row, coord_col, pin FROM markers WHERE battle_id = ? AND board_id = ? \
                   ORDER BY coord_row, coord_col";
        let rows = sqlx::query_as::<_, MarkerRow>(sql)
            .bind(battle)
            .bind(board)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let pin = PinColor::from_code(row.pin)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown pin {}", row.pin)))?;
                Ok(Marker {
                    cell: stored_cell(row.coord_row, &row.coord_col)?,
                    pin,
                })
            })
            .collect()
    }

    async fn commit_strike(&self, commit: &StrikeCommit) -> Result<(), StoreError> {
        let battle = &commit.battle;
        let turn = battle
            .turn
            .as_ref()
            .ok_or_else(|| StoreError::Corrupt(format!("battle {} has no turn to commit", battle.id)))?;

        let mut tx = self.pool.begin().await?;

        // Compare-and-swap on the token; a stale token matches no row.
        let sql = "UPDATE battles SET mover_id = ?, turn_token = ?, challenger_sunk = ?, opponent_sunk = ?, \
                   status = ?, winner_id = ? WHERE id = ? AND turn_token = ? AND winner_id IS NULL";
        let result = sqlx::query(sql)
            .bind(turn.mover())
            .bind(turn.token().as_str())
            .bind(battle.challenger_sunk)
            .bind(battle.opponent_sunk)
            .bind(battle.status.code())
            .bind(battle.winner)
            .bind(battle.id)
            .bind(commit.expected_token.as_str())
            .execute(&mut tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }

        let sql = "INSERT INTO markers (battle_id, board_id, coord_row, coord_col, pin) VALUES (?, ?, ?, ?, ?)";
        match sqlx::query(sql)
            .bind(battle.id)
            .bind(commit.board_id)
            .bind(commit.marker.cell.row())
            .bind(commit.marker.cell.col().to_string())
            .bind(commit.marker.pin.code())
            .execute(&mut tx)
            .await
        {
            Ok(_) => {}
            Err(err) if is_duplicate(&err) => return Err(StoreError::Conflict),
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;
        Ok(())
    }
}
