use super::{DbConnection, DbPool};
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::{debug, error};
use snippetbox_core::errors::{DatabaseError, Error, Result};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

// A write job runs against the actor's connection inside a transaction.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

const QUEUE_CAPACITY: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, ErasedReply)>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// The job runs inside an immediate transaction; returning `Err` rolls
    /// every statement of the job back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| actor_stopped("writer actor is not running"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| actor_stopped("writer actor dropped the reply"))??;

        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "writer actor returned an unexpected type".to_string(),
            ))
        })
    }
}

fn actor_stopped(msg: &str) -> Error {
    error!("{}", msg);
    Error::Database(DatabaseError::Internal(msg.to_string()))
}

/// Spawns the single writer to the database on Tokio's blocking pool.
///
/// The actor checks one connection out of the pool on its first job and keeps
/// it for its lifetime. Jobs are processed serially, off the async workers.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, ErasedReply)>(QUEUE_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let mut conn: Option<DbConnection> = None;

        while let Some((job, reply_tx)) = rx.blocking_recv() {
            if conn.is_none() {
                match pool.get() {
                    Ok(fresh) => conn = Some(fresh),
                    Err(e) => {
                        error!("Writer actor could not acquire a connection: {}", e);
                        let _ = reply_tx.send(Err(StorageError::from(e).into()));
                        continue;
                    }
                }
            }
            let Some(c) = conn.as_mut() else {
                continue;
            };

            let result: Result<Box<dyn Any + Send + 'static>> = c
                .immediate_transaction::<_, StorageError, _>(|tx_conn| {
                    job(tx_conn).map_err(StorageError::from)
                })
                .map_err(|e: StorageError| e.into());

            if let Err(e) = &result {
                debug!("Write job rolled back: {}", e);
            }

            // The requester may have given up already.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped: all handles dropped");
    });

    WriteHandle { tx }
}
