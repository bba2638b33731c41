//! 실행 trait: 데몬 분리 이후 제어를 넘겨받는 확장 포인트

use crate::error::LogtallyError;

/// 데몬이 분리(detach)를 마친 뒤 실행할 작업
///
/// 라이프사이클 관리자는 상속 대신 이 trait을 구현한 값을 받아
/// pid 파일 확보 후 한 번 호출합니다. 정상 동작 중에는 반환하지 않으며,
/// 반환하면 프로세스가 종료 절차에 들어갑니다.
pub trait Runnable {
    /// 작업을 실행합니다.
    fn run(&mut self) -> Result<(), LogtallyError>;
}

/// 클로저도 그대로 실행 작업으로 사용할 수 있습니다.
impl<F> Runnable for F
where
    F: FnMut() -> Result<(), LogtallyError>,
{
    fn run(&mut self) -> Result<(), LogtallyError> {
        self()
    }
}
